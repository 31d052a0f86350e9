//! Provides parsing helpers for capacity expressions.

/// Parses a capacity (number of entries) from a given string.
///
/// This string can have the following suffixes:
/// * **k** or **K**: multiplies the value by 1024
/// * **m** or **M**: multiplies the value by 1024 * 1024
/// * **g** or **G**: multiplies the value by 1024 * 1024 * 1024
///
/// Returns an **Err** if either a non-integer value, an unknown suffix or a value which doesn't
/// fit into a **usize** was given.
///
/// # Examples
///
/// ```
/// assert_eq!(tenure::fmt::parse_capacity("0").unwrap(), 0);
/// assert_eq!(tenure::fmt::parse_capacity("100").unwrap(), 100);
/// assert_eq!(tenure::fmt::parse_capacity("8k").unwrap(), 8192);
/// assert_eq!(tenure::fmt::parse_capacity(" 2 M ").unwrap(), 2 * 1024 * 1024);
/// assert_eq!(tenure::fmt::parse_capacity("1g").unwrap(), 1024 * 1024 * 1024);
///
/// assert_eq!(tenure::fmt::parse_capacity("").is_err(), true);
/// assert_eq!(tenure::fmt::parse_capacity("-1").is_err(), true);
/// assert_eq!(tenure::fmt::parse_capacity("1.5k").is_err(), true);
/// assert_eq!(tenure::fmt::parse_capacity("12 x").is_err(), true);
/// ```
pub fn parse_capacity(str: impl AsRef<str>) -> anyhow::Result<usize> {
    lazy_static::lazy_static! {
        static ref NUMBER_AND_SUFFIX: regex::Regex =
            regex::Regex::new(r"^ *(\d+) *([kKmMgG]?) *$").unwrap();
    }

    let captures = NUMBER_AND_SUFFIX.captures(str.as_ref()).ok_or_else(|| {
        anyhow::anyhow!(
            "Cannot parse '{}' into a capacity expression. \
             Expected a positive number and optionally 'k', 'm' or 'g' as suffix.",
            str.as_ref()
        )
    })?;

    let number = captures[1].parse::<usize>()?;
    let factor: usize = match &captures[2] {
        "k" | "K" => 1024,
        "m" | "M" => 1024 * 1024,
        "g" | "G" => 1024 * 1024 * 1024,
        _ => 1,
    };

    number
        .checked_mul(factor)
        .ok_or_else(|| anyhow::anyhow!("The capacity '{}' is too large.", str.as_ref()))
}

#[cfg(test)]
mod tests {
    use crate::fmt::parse_capacity;

    #[test]
    fn errors_are_readable() {
        let error = parse_capacity("lots").unwrap_err().to_string();
        assert_eq!(
            error,
            "Cannot parse 'lots' into a capacity expression. \
             Expected a positive number and optionally 'k', 'm' or 'g' as suffix."
        );
    }

    #[test]
    fn huge_capacities_are_rejected() {
        assert_eq!(parse_capacity("99999999999999999999999").is_err(), true);
        assert_eq!(
            parse_capacity(format!("{}g", usize::MAX / 2)).is_err(),
            true
        );
    }
}
