//! Snippet text for a completed function: one tab stop per argument.

/// Placeholder names for every argument of `signature`.
///
/// A signature `a -> b -> c` has arguments `a` and `b`. A parenthesised
/// function argument spans several `->` segments and counts as one.
pub fn arguments(signature: &str) -> Vec<String> {
    let mut segments = signature.split("->").map(str::trim).collect::<Vec<_>>();
    segments.pop();

    let mut args = Vec::new();
    let mut open_parens: i32 = 0;
    for segment in segments {
        let parens = paren_balance(segment);
        if open_parens != 0 {
            open_parens += parens;
            continue;
        }
        if parens != 0 {
            args.push("function".to_string());
        } else {
            args.push(argify(segment));
        }
        open_parens += parens;
    }
    args
}

fn paren_balance(segment: &str) -> i32 {
    segment.chars().fold(0, |balance, c| match c {
        '(' => balance + 1,
        ')' => balance - 1,
        _ => balance,
    })
}

/// Placeholder for a single argument type.
pub fn argify(arg: &str) -> String {
    if arg.starts_with('(') {
        "tuple".to_string()
    } else if arg.starts_with('[') {
        "list".to_string()
    } else {
        arg.split_whitespace()
            .next()
            .unwrap_or(arg)
            .to_lowercase()
    }
}

/// `name ${1:arg} ${2:arg}`
pub fn snippet(name: &str, signature: &str) -> String {
    arguments(signature)
        .iter()
        .enumerate()
        .fold(name.to_string(), |mut snippet, (n, arg)| {
            snippet.push_str(&format!(" ${{{}:{}}}", n + 1, arg));
            snippet
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_argument_is_one_placeholder() {
        assert_eq!(
            arguments("(a -> b -> b) -> b -> List a -> b"),
            vec!["function", "b", "list"]
        );
        assert_eq!(
            snippet("map", "(a -> b) -> Dict comparable a -> Dict comparable b"),
            "map ${1:function} ${2:dict}"
        );
    }

    #[test]
    fn test_tuple_and_bare_types() {
        assert_eq!(arguments("(Int, Int) -> Float -> Element"), vec!["tuple", "float"]);
        assert_eq!(argify("[a]"), "list");
        assert_eq!(argify("Maybe a"), "maybe");
    }

    #[test]
    fn test_constant_has_no_placeholders() {
        assert_eq!(snippet("empty", "Dict k v"), "empty");
        assert!(arguments("").is_empty());
    }

    #[test]
    fn test_nested_function_argument() {
        assert_eq!(
            arguments("((a -> b) -> c) -> Int -> c"),
            vec!["function", "int"]
        );
    }
}
