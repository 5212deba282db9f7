const UNITS: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

// Base-1000 group names, least significant first. u64 tops out in the
// quintillions, so seven entries cover the whole range.
const SCALES: [&str; 7] = [
    "",
    " Thousand",
    " Million",
    " Billion",
    " Trillion",
    " Quadrillion",
    " Quintillion",
];

/// Standard English cardinal naming: 1500 -> "One Thousand Five Hundred".
pub fn number_to_words(n: i64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }
    if n < 0 {
        return format!("Negative {}", words_u64(n.unsigned_abs()));
    }
    words_u64(n as u64)
}

fn words_u64(n: u64) -> String {
    let mut groups = Vec::new();
    let mut rest = n;
    while rest > 0 {
        groups.push((rest % 1000) as usize);
        rest /= 1000;
    }

    let mut parts = Vec::new();
    for (scale, group) in groups.iter().enumerate().rev() {
        if *group == 0 {
            continue;
        }
        parts.push(format!("{}{}", below_thousand(*group), SCALES[scale]));
    }
    parts.join(" ")
}

fn below_thousand(n: usize) -> String {
    let mut out = String::new();
    let hundreds = n / 100;
    let rem = n % 100;

    if hundreds > 0 {
        out.push_str(UNITS[hundreds]);
        out.push_str(" Hundred");
        if rem != 0 {
            out.push(' ');
        }
    }

    if rem >= 20 {
        out.push_str(TENS[rem / 10]);
        if rem % 10 != 0 {
            out.push(' ');
            out.push_str(UNITS[rem % 10]);
        }
    } else if rem > 0 {
        out.push_str(UNITS[rem]);
    }

    out
}
