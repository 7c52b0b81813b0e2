fn main() {
    pole_survey::cli::run();
}
