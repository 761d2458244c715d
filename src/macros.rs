/// Builds an [`EnvMap`](crate::EnvMap) from `name => value` pairs.
///
/// Values may be any expression implementing `ToString`.
///
/// # Examples
///
/// ```rust
/// use serde_envpath::envmap;
///
/// let env = envmap! {
///     "APP_PORT" => 8080,
///     "APP_HOST" => "localhost",
/// };
/// assert_eq!(env.get("APP_PORT"), Some("8080"));
/// assert_eq!(env.len(), 2);
/// ```
#[macro_export]
macro_rules! envmap {
    () => {
        $crate::EnvMap::new()
    };

    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut env = $crate::EnvMap::new();
        $(
            env.insert($name, ::std::string::ToString::to_string(&$value));
        )+
        env
    }};
}

#[cfg(test)]
mod tests {
    use crate::EnvMap;

    #[test]
    fn test_envmap_empty() {
        assert_eq!(envmap! {}, EnvMap::new());
    }

    #[test]
    fn test_envmap_values() {
        let env = envmap! {
            "FLAG" => true,
            "RATIO" => 0.5,
            "NAME" => "svc",
        };
        assert_eq!(env.get("FLAG"), Some("true"));
        assert_eq!(env.get("RATIO"), Some("0.5"));
        assert_eq!(env.get("NAME"), Some("svc"));
    }

    #[test]
    fn test_envmap_later_value_wins() {
        let env = envmap! { "A" => 1, "A" => 2 };
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("A"), Some("2"));
    }
}
