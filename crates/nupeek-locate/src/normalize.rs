/// Rewrite friendly generic syntax into the metadata name form.
///
/// `My.Type<A, B>` becomes ``My.Type`2``; `My.Type<>` and `My.Type<T>` become
/// ``My.Type`1``. Names that already carry a backtick, or have no generic argument
/// list, are returned trimmed.
pub fn normalize_type_name(name: &str) -> String {
    let clean = name.trim();
    if clean.contains('`') {
        return clean.to_string();
    }

    let (Some(open), Some(close)) = (clean.find('<'), clean.rfind('>')) else {
        return clean.to_string();
    };
    if open == 0 || close <= open {
        return clean.to_string();
    }

    let root = clean[..open].trim();
    let arity = generic_arity(&clean[open + 1..close]);
    format!("{root}`{arity}")
}

/// Count top-level arguments; nested argument lists do not contribute.
fn generic_arity(args: &str) -> usize {
    if args.trim().is_empty() {
        return 1;
    }

    let mut depth = 0usize;
    let mut count = 1;
    for ch in args.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => count += 1,
            _ => {}
        }
    }
    count
}
