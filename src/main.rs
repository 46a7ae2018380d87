mod cli;

fn main() -> anyhow::Result<()> {
    handsign::logging::init();
    cli::run()
}
