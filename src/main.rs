fn main() -> anyhow::Result<()> {
    pyre_router::cli::run_cli()
}
