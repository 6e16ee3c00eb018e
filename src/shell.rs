//! Bash integration snippets printed by `bash-enable` / `bash-disable`.
//!
//! Usage: `eval "$(hs9001 bash-enable)"` in `~/.bashrc`.

/// Exit status of `search` and `delete`. The prompt hook passes it back as
/// `--ret`, which makes `add` skip the history command itself.
pub const SEARCH_EXIT_STATUS: i32 = crate::history::EXIT_CODE_NO_LOG;

/// Script that records every command after it runs.
pub fn bash_enable(bin: &str) -> String {
    format!(
        r#"if [ -n "$PS1" ]; then
    PROMPT_COMMAND='{bin} add --ret $? "$(history 1)"'
fi
alias hs='{bin} search'
"#
    )
}

/// Script that stops recording.
pub fn bash_disable() -> &'static str {
    "unset PROMPT_COMMAND\nunalias hs 2>/dev/null\n"
}
