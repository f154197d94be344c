pub(crate) const LIGHTSPEED: f64 = 299_792_458.0;
pub(crate) const M_TO_KM: f64 = 1e-3;

pub(crate) const CARRIER_FREQ_HZ: f64 = 195e6;
pub(crate) const BANDWIDTH_HZ: f64 = 9.5e6;
