use clt_engine::PdfPreset;

pub(crate) fn run() {
    println!("{:<10} {}", "Preset", "Density (unnormalized)");
    println!("{}", "-".repeat(40));
    for preset in PdfPreset::ALL {
        let marker = if preset == PdfPreset::default() {
            " (default)"
        } else {
            ""
        };
        println!("{:<10} {}{marker}", preset.to_string(), preset.formula());
    }
}
