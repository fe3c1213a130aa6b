//! Helpers for the forward-slash paths used inside archives and manifests.

/// Normalizes separators to `/` and strips any leading `./` segments.
///
/// ```
/// use deltahub_model::paths::normalize;
/// assert_eq!(normalize(".\\chapter1_windows\\data.win"), "chapter1_windows/data.win");
/// assert_eq!(normalize("./././a.png"), "a.png");
/// ```
pub fn normalize(path: &str) -> String {
    let mut path = path.trim().replace('\\', "/");
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    path
}

/// Returns everything after the last separator (either `/` or `\`).
///
/// ```
/// use deltahub_model::paths::basename;
/// assert_eq!(basename("patches/chapter1.xdelta"), "chapter1.xdelta");
/// assert_eq!(basename("patches\\chapter1.xdelta"), "chapter1.xdelta");
/// assert_eq!(basename("data.win"), "data.win");
/// assert_eq!(basename("dir/"), "");
/// ```
pub fn basename(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

/// Returns the directory part of `path` including its trailing `/`, or an
/// empty string when the path has no directory component.
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..=index],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("sprites/a.png", "sprites/")]
    #[case("a/b/c.png", "a/b/")]
    #[case("c.png", "")]
    #[case("", "")]
    fn test_dirname(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(dirname(path), expected);
    }

    #[test]
    fn test_normalize_keeps_inner_dots() {
        assert_eq!(normalize("a/./b.png"), "a/./b.png");
        assert_eq!(normalize("  ./a.png "), "a.png");
    }
}
