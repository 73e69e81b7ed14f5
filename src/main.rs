fn main() {
    #[cfg(feature = "cli")]
    polypack::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("polypack: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
