use console::Style;
use timebin_core::pipeline::config::BinConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_bin_summary(config: &BinConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Temporal Binning"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(16)));
    println!();

    // Inputs, in stream order
    println!("  {}", s.header.apply_to("Inputs"));
    for (i, input) in config.inputs.iter().enumerate() {
        println!(
            "    {}. {}",
            s.label.apply_to(i + 1),
            s.path.apply_to(input.display())
        );
    }
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Window"),
        s.value.apply_to(format!("{} frames", config.window_size))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Execution"),
        s.method.apply_to(config.parallelism)
    );

    match config.metadata {
        Some(ref meta) => println!(
            "  {:<14}{} -> {}",
            s.label.apply_to("Metadata"),
            s.path.apply_to(meta.input.display()),
            s.path.apply_to(meta.output.display())
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Metadata"),
            s.disabled.apply_to("none")
        ),
    }
    println!();
}
