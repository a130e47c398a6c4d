//! Lenient parsing of query parameters

use std::collections::HashMap;

/// Integer query parameter; missing or malformed values read as 0.
pub fn int_param(params: &HashMap<String, String>, key: &str) -> i64 {
    params
        .get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_param() {
        let params: HashMap<String, String> = [
            ("gamePk", "2018030417"),
            ("personId", "abc"),
            ("blank", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(int_param(&params, "gamePk"), 2018030417);
        assert_eq!(int_param(&params, "personId"), 0);
        assert_eq!(int_param(&params, "blank"), 0);
        assert_eq!(int_param(&params, "missing"), 0);
    }
}
