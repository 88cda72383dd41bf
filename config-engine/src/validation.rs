// Post-load invariant checks

/// Implemented by configuration types whose fields constrain each other
///
/// Returns every violation found, not just the first, so an operator can
/// fix a configuration file in one pass.
pub trait ValidateConfig {
    fn validate(&self) -> Result<(), Vec<String>>;
}

/// Collects violations for a `ValidateConfig` implementation
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` when `condition` does not hold
    pub fn check(&mut self, condition: bool, message: impl FnOnce() -> String) {
        if !condition {
            self.0.push(message());
        }
    }

    pub fn extend(&mut self, other: Result<(), Vec<String>>) {
        if let Err(more) = other {
            self.0.extend(more);
        }
    }

    pub fn finish(self) -> Result<(), Vec<String>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_failures() {
        let mut v = Violations::new();
        v.check(1 < 2, || "unreachable".into());
        v.check(false, || "first".into());
        v.extend(Err(vec!["second".into()]));
        assert_eq!(v.finish(), Err(vec!["first".to_string(), "second".to_string()]));
    }

    #[test]
    fn empty_is_ok() {
        assert_eq!(Violations::new().finish(), Ok(()));
    }
}
