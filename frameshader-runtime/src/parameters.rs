/// Trait for filter chains that allow runtime access to filter parameters.
pub trait FilterChainParameters {
    /// Get the value of a parameter of the filter at `index`.
    fn get_parameter(&self, index: usize, name: &str) -> Option<f32>;

    /// Set a parameter of the filter at `index`, returning the previous value.
    ///
    /// Returns `None` and does nothing if the filter has no such parameter.
    fn set_parameter(&mut self, index: usize, name: &str, value: f32) -> Option<f32>;

    /// The `(filter index, name, value)` of every parameter in the chain.
    fn parameters(&self) -> Vec<(usize, String, f32)>;
}
