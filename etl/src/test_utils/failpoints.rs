use fail::FailScenario;

/// Failpoint actions active until the scenario is dropped.
///
/// Holding the scenario serializes tests using failpoints, since [`FailScenario`] takes a global
/// lock. Every configured failpoint is switched off again on drop.
pub struct FailpointScenario<'a> {
    _scenario: FailScenario<'a>,
    names: Vec<String>,
}

impl<'a> FailpointScenario<'a> {
    /// Configures each `(name, action)` pair, e.g. `("pipeline_run.before_load", "return")`.
    pub fn setup(failpoints: &[(&str, &str)]) -> FailpointScenario<'a> {
        let scenario = FailScenario::setup();

        let mut names = Vec::with_capacity(failpoints.len());
        for (name, action) in failpoints {
            fail::cfg(*name, action).expect("failpoint action should be valid");
            names.push(name.to_string());
        }

        Self {
            _scenario: scenario,
            names,
        }
    }

    /// Makes every listed failpoint return an error.
    pub fn returning(names: &[&str]) -> FailpointScenario<'a> {
        let failpoints: Vec<(&str, &str)> = names.iter().map(|name| (*name, "return")).collect();

        Self::setup(&failpoints)
    }
}

impl Drop for FailpointScenario<'_> {
    fn drop(&mut self) {
        for name in &self.names {
            fail::remove(name);
        }
    }
}
