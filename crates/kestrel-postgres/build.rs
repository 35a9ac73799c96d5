#![forbid(unsafe_code)]

/// `embed_migrations!` is not re-run when only the SQL files change, so the
/// crate is rebuilt whenever the migration directory does.
fn main() {
    println!("cargo:rerun-if-changed=./migrations");
}
