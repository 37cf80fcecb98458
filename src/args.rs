pub struct Args {
    pub texture: std::path::PathBuf,
}
