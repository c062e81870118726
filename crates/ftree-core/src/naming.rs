//! Collision-free names inside a destination directory.
//!
//! Candidates are probed serially through the caller's existence check; the
//! single owned connection serializes those checks, so no locking is involved.

/// Name of the `attempt`-th variant of `base_name`: `name (n)` for
/// directories and extension-less files, `name (n).ext` otherwise.
pub fn variant_name(base_name: &str, is_directory: bool, attempt: u32) -> String {
    if attempt == 0 {
        return base_name.to_string();
    }
    if is_directory {
        return format!("{} ({})", base_name, attempt);
    }
    match base_name.rfind('.') {
        Some(dot) => format!("{} ({}){}", &base_name[..dot], attempt, &base_name[dot..]),
        None => format!("{} ({})", base_name, attempt),
    }
}

/// Returns the first name, starting with `base_name` itself, that `exists`
/// reports as free inside `target_dir`, together with its full path.
///
/// `join` builds the candidate path from the directory and a name, so the
/// same policy serves the remote namespace and the local one.
pub fn next_name<P, F, E, J>(
    mut exists: F,
    join: J,
    base_name: &str,
    is_directory: bool,
    target_dir: &P,
) -> Result<(String, P), E>
where
    F: FnMut(&P) -> Result<bool, E>,
    J: Fn(&P, &str) -> P,
{
    let mut attempt = 0u32;
    loop {
        let name = variant_name(base_name, is_directory, attempt);
        let candidate = join(target_dir, &name);
        if !exists(&candidate)? {
            return Ok((name, candidate));
        }
        log::debug!("name {} already taken, trying next variant", name);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::convert::Infallible;

    fn join(dir: &String, name: &str) -> String {
        format!("{}/{}", dir, name)
    }

    fn pick(taken: &HashSet<String>, base: &str, is_dir: bool) -> String {
        let (name, _) = next_name(
            |p: &String| Ok::<_, Infallible>(taken.contains(p)),
            join,
            base,
            is_dir,
            &"/dst".to_string(),
        )
        .unwrap();
        name
    }

    #[test]
    fn free_name_is_kept() {
        let taken = HashSet::new();
        assert_eq!(pick(&taken, "report.txt", false), "report.txt");
    }

    #[test]
    fn suffix_goes_before_last_extension() {
        let taken: HashSet<String> = ["/dst/report.txt", "/dst/report (1).txt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(pick(&taken, "report.txt", false), "report (2).txt");
        assert_eq!(variant_name("archive.tar.gz", false, 1), "archive.tar (1).gz");
    }

    #[test]
    fn no_extension_is_invented() {
        let taken: HashSet<String> = ["/dst/Makefile".to_string()].into_iter().collect();
        assert_eq!(pick(&taken, "Makefile", false), "Makefile (1)");
    }

    #[test]
    fn directories_ignore_dots() {
        let taken: HashSet<String> = ["/dst/v1.2".to_string()].into_iter().collect();
        assert_eq!(pick(&taken, "v1.2", true), "v1.2 (1)");
    }

    #[test]
    fn variants_increase_and_keep_extension() {
        let names: Vec<String> = (1..=5).map(|n| variant_name("report.txt", false, n)).collect();
        for (idx, name) in names.iter().enumerate() {
            assert!(name.ends_with(".txt"));
            assert!(name.contains(&format!("({})", idx + 1)));
        }
    }

    #[test]
    fn probe_failure_is_surfaced() {
        let result = next_name(
            |_: &String| Err::<bool, _>("listing failed"),
            join,
            "x",
            false,
            &"/dst".to_string(),
        );
        assert_eq!(result.unwrap_err(), "listing failed");
    }
}
