/// Windows has no POSIX signal delivery, so every registry name is marked
/// absent. Termination goes through the native forced-termination call on
/// the process handle instead.
pub fn resolve_signal(_name: &str) -> Option<i32> {
    None
}
