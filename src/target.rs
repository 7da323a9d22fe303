use std::fmt;
use std::str::FromStr;

/// Shell dialects a generator can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetShell {
    #[default]
    Bash,
}

impl TargetShell {
    pub const ALL: &'static [TargetShell] = &[TargetShell::Bash];

    pub fn name(self) -> &'static str {
        match self {
            TargetShell::Bash => "bash",
        }
    }
}

impl fmt::Display for TargetShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetShell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetShell::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = TargetShell::ALL.iter().map(|t| t.name()).collect();
                format!("unknown target '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_target_and_rejects_others() {
        assert_eq!("bash".parse::<TargetShell>(), Ok(TargetShell::Bash));
        let err = "posix".parse::<TargetShell>().unwrap_err();
        assert!(err.contains("unknown target 'posix'"));
        assert!(err.contains("bash"));
    }
}
