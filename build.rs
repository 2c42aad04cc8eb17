fn main() {
    // Tell Cargo to rerun this build script if app.rc or app.manifest changes.
    println!("cargo:rerun-if-changed=app.rc");
    println!("cargo:rerun-if-changed=app.manifest");

    // Only the demo binary carries the manifest; the cdylib is loaded by a host
    // that brings its own. On non-Windows targets this is a no-op.
    let _ = embed_resource::compile_for("app.rc", ["soft_input_demo"], &[] as &[&str]);
}
