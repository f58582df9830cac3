//! Property-based tests for override scanning.
//!
//! These tests generate declarations with shuffled attributes and arbitrary
//! whitespace and check that extraction is unaffected.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::OverrideScanner;
    use proptest::prelude::*;

    fn ident() -> impl Strategy<Value = String> {
        "[a-z]([a-z0-9_]{0,14}[a-z0-9])?"
    }

    fn commit() -> impl Strategy<Value = String> {
        "[0-9a-f]{7,40}"
    }

    fn separator() -> impl Strategy<Value = String> {
        prop::sample::select(vec![" ", "\n", "\n    ", "\t", "  \n\n  "]).prop_map(String::from)
    }

    proptest! {
        /// Property: attribute order and whitespace never change what is extracted
        #[test]
        fn extraction_ignores_order_and_whitespace(
            module in ident(),
            owner in ident(),
            repo in ident(),
            commit in commit(),
            order in Just(vec![0usize, 1, 2]).prop_shuffle(),
            sep in separator(),
        ) {
            let remote = format!("https://github.com/{}/{}.git", owner, repo);
            let attrs = [
                format!("module_name{sep}={sep}\"{module}\""),
                format!("commit = \"{commit}\""),
                format!("remote{sep}= \"{remote}\""),
            ];
            let body: Vec<&str> = order.iter().map(|&i| attrs[i].as_str()).collect();
            let manifest = format!("git_override({sep}{}{sep})\n", body.join(&format!(",{sep}")));

            let scan = OverrideScanner::new().unwrap().scan(&manifest);

            prop_assert_eq!(scan.skipped, 0);
            prop_assert_eq!(scan.dependencies.len(), 1);
            let dep = &scan.dependencies[0];
            prop_assert_eq!(&dep.module_name, &module);
            prop_assert_eq!(&dep.commit, &commit);
            prop_assert_eq!(&dep.remote, &remote);
            prop_assert_eq!(&dep.owner, &owner);
            prop_assert_eq!(&dep.repo, &repo);
        }

        /// Property: text without git_override yields nothing
        #[test]
        fn no_declarations_no_dependencies(text in "[^g]*") {
            let scan = OverrideScanner::new().unwrap().scan(&text);
            prop_assert!(scan.dependencies.is_empty());
            prop_assert_eq!(scan.skipped, 0);
        }

        /// Property: every declaration is either extracted or counted as skipped
        #[test]
        fn every_declaration_is_accounted_for(
            hosts in prop::collection::vec(prop::bool::ANY, 0..8),
        ) {
            let manifest: String = hosts
                .iter()
                .enumerate()
                .map(|(i, github)| {
                    let host = if *github { "github.com" } else { "gitlab.com" };
                    format!(
                        "git_override(module_name = \"m{i}\", commit = \"{i}\", remote = \"https://{host}/o/m{i}.git\")\n"
                    )
                })
                .collect();

            let scan = OverrideScanner::new().unwrap().scan(&manifest);

            prop_assert_eq!(scan.dependencies.len() + scan.skipped, hosts.len());
            prop_assert_eq!(scan.dependencies.len(), hosts.iter().filter(|g| **g).count());
        }
    }
}
