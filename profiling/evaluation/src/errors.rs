//! Error types for the evaluation crate.

/// Creates the Error, ErrorKind, ResultExt, and Result types
error_chain!{
    foreign_links {
        Io(::std::io::Error);
        Csv(::csv::Error);
        Toml(::toml::de::Error);
        Regex(::regex::Error);
    }

    errors {
        Cardinality(what: String, expected: usize, found: usize) {
            description("unexpected number of reference rows")
            display("expected exactly {} {} row(s), found {}", expected, what, found)
        }
        MissingBaseline(what: String) {
            description("no matching baseline row")
            display("no baseline row for {}", what)
        }
        MissingColumn(column: String) {
            description("required value is empty")
            display("column {} is empty where a value is required", column)
        }
        EmptyDataset(what: String) {
            description("no rows loaded")
            display("no rows loaded from {}", what)
        }
        SchemaMismatch(path: String) {
            description("columns differ between input files")
            display("columns of {} differ from the first loaded file", path)
        }
        UnknownCompression(path: String) {
            description("unsupported input file")
            display("cannot decide how to read {}", path)
        }
        Render(what: String) {
            description("error in rendering a chart")
            display("failed to render {}", what)
        }
    }
}
