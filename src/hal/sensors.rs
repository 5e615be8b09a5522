/// Optional height source, e.g. a barometer or rangefinder
pub trait Altimeter {
    /// Height above takeoff point in meters, `None` when no valid estimate exists
    fn altitude(&mut self) -> Option<f32>;
}
