/// Bundles the plugin via nih_plug_xtask:
///
///   cargo xtask bundle loveless-stereo-delay --release
///
/// Output lands in `target/bundled/` as `.clap` and `.vst3` bundles.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
