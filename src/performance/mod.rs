pub(crate) mod performance_model;
pub(crate) mod return_calibrator;

pub use performance_model::{PerformanceSeries, ReturnData, ReturnMethod};
pub use return_calibrator::{CalibrationParams, ReturnIndexCalibrator};
