//! The shell phase that hands a buildable target over to Bazel.

use shell_quote::{QuoteRefExt, Sh};

use crate::label::BuildLabel;
use crate::project::ShellScriptBuildPhase;
use crate::settings::GeneratorOptions;

const SHELL: &str = "/bin/bash";
const PHASE_NAME: &str = "Build with Bazel";

fn quote(word: &str) -> String {
    let bytes: Vec<u8> = word.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug_assert!(false, "shell quoting produced non UTF-8 bytes: {err}");
            String::from_utf8_lossy(&err.into_bytes()).into_owned()
        }
    }
}

/// Escape `"`, `` ` `` and `\` for a double-quoted shell word, leaving `$`
/// free to expand.
fn double_quoted_body(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        if matches!(c, '"' | '`' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Script invoking the build wrapper for `label`.
///
/// The wrapper path stays inside double quotes so build setting references
/// such as `${PROJECT_FILE_PATH}` expand at build time.
#[must_use]
pub fn build_script(options: &GeneratorOptions, label: &BuildLabel) -> String {
    format!(
        "set -e\ncd \"${{SRCROOT}}\"\nexec \"{script}\" {label} --bazel {bazel}\n",
        script = double_quoted_body(options.build_script_path.as_str()),
        label = quote(label.as_str()),
        bazel = quote(options.bazel_path.as_str()),
    )
}

/// The single build phase of a buildable target.
#[must_use]
pub fn bazel_build_phase(options: &GeneratorOptions, label: &BuildLabel) -> ShellScriptBuildPhase {
    ShellScriptBuildPhase {
        name: PHASE_NAME.to_owned(),
        shell_path: SHELL.to_owned(),
        shell_script: build_script(options, label),
        input_paths: Vec::new(),
        output_paths: Vec::new(),
        show_env_vars_in_log: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    #[rstest]
    fn quotes_label_and_bazel_path() {
        let options = GeneratorOptions {
            bazel_path: Utf8PathBuf::from("/opt/my tools/bazel"),
            ..GeneratorOptions::default()
        };
        let label = BuildLabel::parse("//app:App").expect("label");
        let script = build_script(&options, &label);
        let last = script.lines().last().expect("exec line");
        let words = shlex::split(last).expect("balanced quoting");
        assert_eq!(
            words.get(2..).map(<[String]>::to_vec),
            Some(vec![
                "//app:App".to_owned(),
                "--bazel".to_owned(),
                "/opt/my tools/bazel".to_owned(),
            ])
        );
        assert!(last.starts_with("exec \"${PROJECT_FILE_PATH}/.xcbazel/Scripts/bazel_build.py\""));
    }

    #[rstest]
    #[case("/tools/bazel build.py", "/tools/bazel build.py")]
    #[case("/tools/\"odd\"/run", "/tools/\\\"odd\\\"/run")]
    #[case("/tools/`x`\\run", "/tools/\\`x\\`\\\\run")]
    #[case("${PROJECT_FILE_PATH}/run", "${PROJECT_FILE_PATH}/run")]
    fn wrapper_path_is_escaped_inside_double_quotes(#[case] path: &str, #[case] expected: &str) {
        let options = GeneratorOptions {
            build_script_path: Utf8PathBuf::from(path),
            ..GeneratorOptions::default()
        };
        let label = BuildLabel::parse("//app:App").expect("label");
        let script = build_script(&options, &label);
        let last = script.lines().last().expect("exec line");
        assert!(last.starts_with(&format!("exec \"{expected}\" ")), "{last}");
    }
}
