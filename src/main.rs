fn main() -> anyhow::Result<()> {
    chattui::cli::run()
}
