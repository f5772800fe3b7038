fn main() {
    // Embed git commit and build metadata for `X-App` and `--version`.
    if let Err(err) = built::write_built_file() {
        panic!("Failed to acquire build-time information: {err}");
    }
}
