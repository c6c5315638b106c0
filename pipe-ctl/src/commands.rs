use log::info;

pub fn list_variants() {
    info!("Listing available variants");
    println!("Available variants:\n");
    println!("  echo           - Framed payload, each byte shifted and echoed by the child");
    println!("  greeting       - \"Hello from parent\" and the child pid, relayed verbatim");
    println!();
    println!("Available framings:\n");
    println!("  sentinel        - Payload followed by 0x00 (payload must not contain 0x00)");
    println!("  length-prefixed - Four-byte big-endian length, then any payload bytes");
    println!();
    println!("Use --variant <VARIANT> and --framing <FRAMING> to select them");
}
