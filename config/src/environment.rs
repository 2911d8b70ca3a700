/// Deployment the verified nodes belong to; selects the config file layered on top of `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Docker,
    PreAlpha,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Docker => "docker",
            Environment::PreAlpha => "pre-alpha",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "docker" => Ok(Self::Docker),
            "pre-alpha" => Ok(Self::PreAlpha),
            other => Err(format!(
                "{} is not a supported environment. Use either `local`, `docker` or `pre-alpha`.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;

    #[test]
    fn environment_names_round_trip() {
        for env in [Environment::Local, Environment::Docker, Environment::PreAlpha] {
            assert_eq!(Environment::try_from(env.as_str().to_uppercase()), Ok(env));
        }
        assert!(Environment::try_from("mainnet".to_owned()).is_err());
    }
}
