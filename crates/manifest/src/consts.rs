use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// First `chapterN` token anywhere in a target path.
regex!(CHAPTER_TOKEN_REGEX, r"(?i)chapter[_ ]?(\d+)");
// The chapter root directory, optionally with a platform suffix such as
// `chapter2_windows/` or `demo_mac/`, and everything before it.
regex!(CHAPTER_ROOT_REGEX, r"(?i)^(?:[^/]*/)*?(?:chapter[_ ]?\d+|demo)(?:_[a-z0-9]+)?/");
