use skillmine::patterns::{BashCategory, classify_bash_command};
use skillmine::test_utils::{TestCase, run_table_tests};

#[test]
fn classifies_common_commands() {
    let cases = vec![
        TestCase::new("git status", "git status", BashCategory::VersionControl),
        TestCase::new("gh pr", "gh pr create --fill", BashCategory::VersionControl),
        TestCase::new("cargo test", "cargo test -p core", BashCategory::TestRunner),
        TestCase::new("pytest", "pytest -x tests/", BashCategory::TestRunner),
        TestCase::new("npm test", "npm test", BashCategory::TestRunner),
        TestCase::new("npm run test:unit", "npm run test:unit", BashCategory::TestRunner),
        TestCase::new("python -m pytest", "python -m pytest -q", BashCategory::TestRunner),
        TestCase::new("cargo build", "cargo build --release", BashCategory::Build),
        TestCase::new("make", "make", BashCategory::Build),
        TestCase::new("npm install", "npm install lodash", BashCategory::PackageManagement),
        TestCase::new("pip", "pip install requests", BashCategory::PackageManagement),
        TestCase::new("ls", "ls -la", BashCategory::FileOperation),
        TestCase::new("rg", "rg TODO src", BashCategory::Search),
        TestCase::new("python -c", "python -c 'print(1)'", BashCategory::InlineScript),
        TestCase::new("empty", "", BashCategory::Other),
        TestCase::new("unknown", "frobnicate --all", BashCategory::Other),
    ];
    run_table_tests(cases, classify_bash_command);
}

#[test]
fn only_first_segment_counts() {
    let cases = vec![
        TestCase::new("and-chain", "git add . && cargo test", BashCategory::VersionControl),
        TestCase::new("pipe", "cat log.txt | grep error", BashCategory::FileOperation),
        TestCase::new("quoted separator", "rg 'a && b' src", BashCategory::Search),
        TestCase::new("env prefix", "RUST_LOG=debug cargo test", BashCategory::TestRunner),
        TestCase::new("sudo wrapper", "sudo apt-get install jq", BashCategory::PackageManagement),
        TestCase::new("absolute path", "/usr/bin/git log", BashCategory::VersionControl),
    ];
    run_table_tests(cases, classify_bash_command);
}
