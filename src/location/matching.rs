/// Well-known dual names for Indian cities, both directions.
const CITY_ALIASES: &[(&str, &str)] = &[
    ("bengaluru", "bangalore"),
    ("bangalore", "bengaluru"),
    ("mumbai", "bombay"),
    ("bombay", "mumbai"),
    ("kolkata", "calcutta"),
    ("calcutta", "kolkata"),
    ("chennai", "madras"),
    ("madras", "chennai"),
    ("thiruvananthapuram", "trivandrum"),
    ("trivandrum", "thiruvananthapuram"),
];

/// Finds the dataset city for a geocoded city name.
///
/// Tries a case-insensitive exact match, then containment in either
/// direction, then the alias table.
pub fn match_city<'a>(detected: &str, cities: &'a [String]) -> Option<&'a str> {
    let detected = detected.trim().to_lowercase();
    if detected.is_empty() {
        return None;
    }
    let normalized = |c: &String| c.trim().to_lowercase();

    if let Some(city) = cities.iter().find(|c| normalized(c) == detected) {
        return Some(city.as_str());
    }

    if let Some(city) = cities.iter().find(|c| {
        let c = normalized(c);
        !c.is_empty() && (c.contains(&detected) || detected.contains(&c))
    }) {
        return Some(city.as_str());
    }

    let (_, alias) = CITY_ALIASES.iter().find(|(name, _)| *name == detected)?;
    cities
        .iter()
        .find(|c| normalized(c) == *alias)
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cities() -> Vec<String> {
        ["Bangalore", "Chennai", "Navi Mumbai", "Pune"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn test_exact_match_ignores_case() {
        assert_eq!(match_city(" pune ", &cities()), Some("Pune"));
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(match_city("Mumbai", &cities()), Some("Navi Mumbai"));
    }

    #[test]
    fn test_alias_match() {
        assert_eq!(match_city("Bengaluru", &cities()), Some("Bangalore"));
        assert_eq!(match_city("Madras", &cities()), Some("Chennai"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(match_city("Jaipur", &cities()), None);
        assert_eq!(match_city("  ", &cities()), None);
    }
}
