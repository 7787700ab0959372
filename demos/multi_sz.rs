//! Example showing how to build, edit, and walk a packed multi-string.

use std::io;

use winwrap::multi_sz::{MultiSz, MultiSzView};

fn main() -> Result<(), io::Error> {
    // Build a list and append to it
    let mut list = MultiSz::from_strs(["alpha", "gamma"]);
    list.push_str("delta");
    println!("Built: {:?}", list.to_strings_lossy());

    // Insert before "gamma"
    let mut cursor = list.begin();
    cursor.move_next();
    let at = cursor.position();
    let beta: Vec<u16> = "beta".encode_utf16().collect();
    list.insert(at, &beta);
    println!("After insert: {:?}", list.to_strings_lossy());

    // Walk backward
    print!("Reversed:");
    for s in list.iter().rev() {
        print!(" {}", String::from_utf16_lossy(s));
    }
    println!();

    // A buffer as a registry value or device API might return it
    let raw: Vec<u16> = "one\0two\0\0 unused tail".encode_utf16().collect();
    let view = MultiSzView::new(&raw);
    println!("\nView holds {} strings: {:?}", view.len(), view.to_strings_lossy());

    // Strict validation rejects the tail, the view trims it
    match MultiSz::try_from(raw.as_slice()) {
        Ok(_) => println!("Raw buffer is well-formed"),
        Err(err) => println!("Rejected: {err}"),
    }
    let trimmed = view.to_multi_string();
    println!("Trimmed to {} units", trimmed.buffer_len());

    // Empty versus absent
    let absent = MultiSz::new();
    let mut empty = MultiSz::new();
    empty.push_str("");
    println!(
        "\nabsent: is_absent={} buffer_len={}",
        absent.is_absent(),
        absent.buffer_len()
    );
    println!(
        "empty: is_absent={} buffer_len={}",
        empty.is_absent(),
        empty.buffer_len()
    );

    Ok(())
}
