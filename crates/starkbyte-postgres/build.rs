#![forbid(unsafe_code)]

/// `embed_migrations!` does not track the migration directory on its own,
/// so the crate is rebuilt whenever a migration file is added or changed.
fn main() {
    println!("cargo:rerun-if-changed=./migrations");
}
