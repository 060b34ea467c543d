fn main() -> std::process::ExitCode {
    plant_vision_lib::run()
}
