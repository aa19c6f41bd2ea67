fn main() -> anyhow::Result<()> {
    srsdb::run()
}
