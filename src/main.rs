fn main() -> anyhow::Result<()> {
    battery_widget_lib::run()
}
