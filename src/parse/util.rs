use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case};
use nom::character::complete::{digit1, one_of, space0};
use nom::combinator::{map, map_res, opt, recognize, value};
use nom::number::complete::float;
use nom::sequence::{pair, preceded, terminated, tuple};


/// Characters that separate tokens on an INI line.
pub fn is_separator(c: char) -> bool {
    c == '=' || c.is_whitespace()
}

pub fn ini_int(input: &str) -> IResult<&str, i32> {
    map_res(
        recognize(pair(opt(one_of("+-")), digit1)),
        |s: &str| s.parse::<i32>()
    )(input)
}

pub fn ini_real(input: &str) -> IResult<&str, f32> {
    float(input)
}

/// `50%` is 0.5.  A bare number is taken as already being a fraction.
pub fn ini_percent(input: &str) -> IResult<&str, f32> {
    alt((
        map(terminated(float, tag("%")), |v| v / 100.0),
        float,
    ))(input)
}

pub fn ini_bool(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("yes")),
        value(true, tag_no_case("true")),
        value(false, tag_no_case("no")),
        value(false, tag_no_case("false")),
    ))(input)
}

fn color_component<'a>(prefix: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, u8> {
    preceded(
        pair(tag_no_case(prefix), space0),
        map_res(digit1, |s: &str| s.parse::<u8>())
    )
}

/// One whole color, `R:255 G:128 B:0`, once the tokens have been joined back together
pub fn ini_rgb(input: &str) -> IResult<&str, (u8, u8, u8)> {
    tuple((
        color_component("R:"),
        preceded(space0, color_component("G:")),
        preceded(space0, color_component("B:")),
    ))(input)
}

/// Chop a line into tokens, dropping the trailing comment.  Comments begin with `;` or `//`.
pub fn line_tokens(line: &str) -> Vec<&str> {
    let code = match (line.find(';'), line.find("//")) {
        (Some(a), Some(b)) => &line[..a.min(b)],
        (Some(a), None) | (None, Some(a)) => &line[..a],
        (None, None) => line,
    };
    code.split(is_separator).filter(|t| !t.is_empty()).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_numbers() {
        assert_eq!(ini_int("-12"), Ok(("", -12)));
        assert_eq!(ini_int("+7"), Ok(("", 7)));
        assert!(ini_int("x7").is_err());
        assert_eq!(ini_real("2.5"), Ok(("", 2.5)));
        assert_eq!(ini_percent("25%"), Ok(("", 0.25)));
        assert_eq!(ini_percent("0.5"), Ok(("", 0.5)));
    }

    #[test]
    fn scans_bools() {
        assert_eq!(ini_bool("Yes"), Ok(("", true)));
        assert_eq!(ini_bool("FALSE"), Ok(("", false)));
        assert!(ini_bool("maybe").is_err());
    }

    #[test]
    fn scans_colors() {
        assert_eq!(ini_rgb("R:255 G:10 B:0"), Ok(("", (255, 10, 0))));
        assert!(ini_rgb("R:256 G:10 B:0").is_err());
    }

    #[test]
    fn tokenizes_lines() {
        assert_eq!(line_tokens("  BuildCost = 800 ; cheap"), vec!["BuildCost", "800"]);
        assert_eq!(line_tokens("Behavior = AIUpdateInterface ModuleTag_03 // ai"),
            vec!["Behavior", "AIUpdateInterface", "ModuleTag_03"]);
        assert!(line_tokens("; all comment").is_empty());
        assert!(line_tokens("   \t").is_empty());
    }
}
