//! Porter stemmer with the NLTK extensions, the variant classifier vocabularies are built with.
//!
//! Works on Unicode scalar values. Anything that is not `a e i o u` (or a
//! vowel-position `y`) counts as a consonant, digits and symbols included.

/// Irregular forms that bypass the suffix rules.
const IRREGULAR: &[(&str, &str)] = &[
    ("sky", "sky"),
    ("skies", "sky"),
    ("dying", "die"),
    ("lying", "lie"),
    ("tying", "tie"),
    ("news", "news"),
    ("innings", "inning"),
    ("inning", "inning"),
    ("outings", "outing"),
    ("outing", "outing"),
    ("cannings", "canning"),
    ("canning", "canning"),
    ("howe", "howe"),
    ("proceed", "proceed"),
    ("exceed", "exceed"),
    ("succeed", "succeed"),
];

type Condition<'a> = &'a dyn Fn(&[char]) -> bool;

struct Rule<'a> {
    suffix: &'static str,
    replacement: &'static str,
    condition: Condition<'a>,
}

fn rule<'a>(suffix: &'static str, replacement: &'static str, condition: Condition<'a>) -> Rule<'a> {
    Rule {
        suffix,
        replacement,
        condition,
    }
}

/// Stem an already lowercased word.
pub fn stem_word(word: &str) -> String {
    if let Some((_, base)) = IRREGULAR.iter().find(|(form, _)| *form == word) {
        return base.to_string();
    }

    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= 2 {
        return word.to_string();
    }

    let w = step1a(chars);
    let w = step1b(w);
    let w = step1c(w);
    let w = step2(w);
    let w = step3(w);
    let w = step4(w);
    let w = step5a(w);
    let w = step5b(w);
    w.into_iter().collect()
}

fn is_consonant(w: &[char], i: usize) -> bool {
    match w[i] {
        'a' | 'e' | 'i' | 'o' | 'u' => false,
        'y' => i == 0 || !is_consonant(w, i - 1),
        _ => true,
    }
}

/// Number of vowel-to-consonant transitions, the `m` in `[C](VC)^m[V]`.
fn measure(stem: &[char]) -> usize {
    let mut count = 0;
    let mut after_vowel = false;
    for i in 0..stem.len() {
        let consonant = is_consonant(stem, i);
        if consonant && after_vowel {
            count += 1;
        }
        after_vowel = !consonant;
    }
    count
}

fn positive_measure(stem: &[char]) -> bool {
    measure(stem) > 0
}

fn measure_above_one(stem: &[char]) -> bool {
    measure(stem) > 1
}

fn always(_: &[char]) -> bool {
    true
}

fn contains_vowel(stem: &[char]) -> bool {
    (0..stem.len()).any(|i| !is_consonant(stem, i))
}

fn ends_double_consonant(w: &[char]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_consonant(w, n - 1)
}

fn ends_cvc(w: &[char]) -> bool {
    let n = w.len();
    let classic = n >= 3
        && is_consonant(w, n - 3)
        && !is_consonant(w, n - 2)
        && is_consonant(w, n - 1)
        && !matches!(w[n - 1], 'w' | 'x' | 'y');
    classic || (n == 2 && !is_consonant(w, 0) && is_consonant(w, 1))
}

fn ends_with(w: &[char], suffix: &str) -> bool {
    let n = suffix.chars().count();
    w.len() >= n && w[w.len() - n..].iter().copied().eq(suffix.chars())
}

fn strip(w: &[char], suffix: &str) -> Vec<char> {
    w[..w.len() - suffix.chars().count()].to_vec()
}

fn replace(w: &[char], suffix: &str, replacement: &str) -> Vec<char> {
    let mut out = strip(w, suffix);
    out.extend(replacement.chars());
    out
}

/// First rule whose suffix matches decides the outcome, even when its
/// condition fails.
fn apply_rules(w: Vec<char>, rules: &[Rule<'_>]) -> Vec<char> {
    for r in rules {
        if ends_with(&w, r.suffix) {
            let stem = strip(&w, r.suffix);
            if (r.condition)(&stem) {
                return replace(&w, r.suffix, r.replacement);
            }
            return w;
        }
    }
    w
}

fn step1a(w: Vec<char>) -> Vec<char> {
    if w.len() == 4 && ends_with(&w, "ies") {
        return replace(&w, "ies", "ie");
    }
    apply_rules(
        w,
        &[
            rule("sses", "ss", &always),
            rule("ies", "i", &always),
            rule("ss", "ss", &always),
            rule("s", "", &always),
        ],
    )
}

fn step1b(w: Vec<char>) -> Vec<char> {
    if ends_with(&w, "ied") {
        let tail = if w.len() == 4 { "ie" } else { "i" };
        return replace(&w, "ied", tail);
    }

    if ends_with(&w, "eed") {
        let stem = strip(&w, "eed");
        return if positive_measure(&stem) {
            replace(&w, "eed", "ee")
        } else {
            w
        };
    }

    let stem = ["ed", "ing"]
        .iter()
        .filter(|suffix| ends_with(&w, suffix))
        .map(|suffix| strip(&w, suffix))
        .find(|stem| contains_vowel(stem));
    let Some(stem) = stem else {
        return w;
    };

    for suffix in ["at", "bl", "iz"] {
        if ends_with(&stem, suffix) {
            let mut out = stem;
            out.push('e');
            return out;
        }
    }

    if ends_double_consonant(&stem) {
        let last = stem[stem.len() - 1];
        return if matches!(last, 'l' | 's' | 'z') {
            stem
        } else {
            stem[..stem.len() - 1].to_vec()
        };
    }

    if measure(&stem) == 1 && ends_cvc(&stem) {
        let mut out = stem;
        out.push('e');
        return out;
    }
    stem
}

fn step1c(w: Vec<char>) -> Vec<char> {
    let consonant_before = |stem: &[char]| stem.len() > 1 && is_consonant(stem, stem.len() - 1);
    apply_rules(w, &[rule("y", "i", &consonant_before)])
}

fn step2(w: Vec<char>) -> Vec<char> {
    if ends_with(&w, "alli") && positive_measure(&strip(&w, "alli")) {
        return step2(replace(&w, "alli", "al"));
    }

    // The `l` of `logi` stays with the stem so short stems like `geo` qualify.
    let logi_stem = |_: &[char]| w.len() >= 3 && positive_measure(&w[..w.len() - 3]);
    let rules = [
        rule("ational", "ate", &positive_measure),
        rule("tional", "tion", &positive_measure),
        rule("enci", "ence", &positive_measure),
        rule("anci", "ance", &positive_measure),
        rule("izer", "ize", &positive_measure),
        rule("bli", "ble", &positive_measure),
        rule("alli", "al", &positive_measure),
        rule("entli", "ent", &positive_measure),
        rule("eli", "e", &positive_measure),
        rule("ousli", "ous", &positive_measure),
        rule("ization", "ize", &positive_measure),
        rule("ation", "ate", &positive_measure),
        rule("ator", "ate", &positive_measure),
        rule("alism", "al", &positive_measure),
        rule("iveness", "ive", &positive_measure),
        rule("fulness", "ful", &positive_measure),
        rule("ousness", "ous", &positive_measure),
        rule("aliti", "al", &positive_measure),
        rule("iviti", "ive", &positive_measure),
        rule("biliti", "ble", &positive_measure),
        rule("fulli", "ful", &positive_measure),
        rule("logi", "log", &logi_stem),
    ];
    apply_rules(w.clone(), &rules)
}

fn step3(w: Vec<char>) -> Vec<char> {
    apply_rules(
        w,
        &[
            rule("icate", "ic", &positive_measure),
            rule("ative", "", &positive_measure),
            rule("alize", "al", &positive_measure),
            rule("iciti", "ic", &positive_measure),
            rule("ical", "ic", &positive_measure),
            rule("ful", "", &positive_measure),
            rule("ness", "", &positive_measure),
        ],
    )
}

fn step4(w: Vec<char>) -> Vec<char> {
    let ion_stem = |stem: &[char]| {
        measure_above_one(stem) && matches!(stem.last().copied(), Some('s' | 't'))
    };
    apply_rules(
        w,
        &[
            rule("al", "", &measure_above_one),
            rule("ance", "", &measure_above_one),
            rule("ence", "", &measure_above_one),
            rule("er", "", &measure_above_one),
            rule("ic", "", &measure_above_one),
            rule("able", "", &measure_above_one),
            rule("ible", "", &measure_above_one),
            rule("ant", "", &measure_above_one),
            rule("ement", "", &measure_above_one),
            rule("ment", "", &measure_above_one),
            rule("ent", "", &measure_above_one),
            rule("ion", "", &ion_stem),
            rule("ou", "", &measure_above_one),
            rule("ism", "", &measure_above_one),
            rule("ate", "", &measure_above_one),
            rule("iti", "", &measure_above_one),
            rule("ous", "", &measure_above_one),
            rule("ive", "", &measure_above_one),
            rule("ize", "", &measure_above_one),
        ],
    )
}

fn step5a(w: Vec<char>) -> Vec<char> {
    if ends_with(&w, "e") {
        let stem = strip(&w, "e");
        let m = measure(&stem);
        if m > 1 || (m == 1 && !ends_cvc(&stem)) {
            return stem;
        }
    }
    w
}

fn step5b(w: Vec<char>) -> Vec<char> {
    if ends_with(&w, "ll") && measure(&w[..w.len() - 1]) > 1 {
        return strip(&w, "l");
    }
    w
}
