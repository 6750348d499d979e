fn main() -> anyhow::Result<()> {
    timetable::run()?;
    Ok(())
}
