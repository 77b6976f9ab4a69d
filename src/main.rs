fn main() -> anyhow::Result<()> {
    subarr::run()
}
