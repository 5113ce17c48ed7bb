//! Shell-style quoting for arguments that must travel as one string
//!
//! Commands are kept as argument vectors everywhere. Only values that a
//! collaborator expects as a single shell-style string (the nested
//! `--pod-args` value) are flattened, and always through [`join`].

pub use shlex::QuoteError;

/// Join arguments into one string, quoting each as needed
pub fn join<S: AsRef<str>>(args: &[S]) -> Result<String, QuoteError> {
    shlex::try_join(args.iter().map(|arg| arg.as_ref()))
}

/// Split a string produced by [`join`] back into its arguments
pub fn split(line: &str) -> Option<Vec<String>> {
    shlex::split(line)
}
