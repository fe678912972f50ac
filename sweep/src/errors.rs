//! Error types for the sweep.

/// Creates the Error, ErrorKind, ResultExt, and Result types
error_chain!{
    links {
        Evaluation(::evaluation::errors::Error, ::evaluation::errors::ErrorKind);
    }

    foreign_links {
        Io(::std::io::Error);
        Csv(::csv::Error);
        Toml(::toml::de::Error);
        ParseFloat(::std::num::ParseFloatError);
        Regex(::regex::Error);
    }

    errors {
        Precondition(what: String) {
            description("environment precondition failed")
            display("precondition failed: {}", what)
        }
        ProcessFailed(command: String, status: String) {
            description("external process failed")
            display("`{}` exited with {}", command, status)
        }
        MissingMarker(marker: String, command: String) {
            description("expected output is missing")
            display("no {} in the output of `{}`", marker, command)
        }
        Parse(what: String) {
            description("malformed measurement")
            display("malformed measurement: {}", what)
        }
        Spawn(command: String) {
            description("cannot start external process")
            display("cannot start `{}`", command)
        }
    }
}
