use pretty_assertions::assert_eq;
use registry_engine::{FormTokens, VIEW_STATE, VIEW_STATE_GENERATOR};
use scraper::Html;

fn absorbed(html: &str) -> (FormTokens, usize) {
    let mut tokens = FormTokens::new();
    let found = tokens.absorb(&Html::parse_document(html));
    (tokens, found)
}

#[test]
fn only_hidden_inputs_carry_tokens() {
    let (tokens, found) = absorbed(
        r#"<form>
             <input type="text" name="__VIEWSTATE" value="typed" />
             <input name="__VIEWSTATEGENERATOR" value="untyped" />
             <input type="HIDDEN" name="__EVENTVALIDATION" value="ev1" />
           </form>"#,
    );
    assert_eq!(found, 1);
    assert_eq!(tokens.view_state(), None);
    assert_eq!(tokens.generator(), None);
    assert_eq!(tokens.event_validation(), Some("ev1"));
}

#[test]
fn first_input_of_each_name_wins() {
    let (tokens, found) = absorbed(
        r#"<form>
             <input type="hidden" name="__VIEWSTATE" value="first" />
             <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
             <input type="hidden" name="__VIEWSTATE" value="second" />
           </form>"#,
    );
    assert_eq!(found, 2);
    assert_eq!(tokens.get(VIEW_STATE), Some("first"));
    assert_eq!(tokens.get(VIEW_STATE_GENERATOR), Some("gen"));
}

#[test]
fn a_later_page_still_replaces_earlier_tokens() {
    let mut tokens = FormTokens::new();
    tokens.absorb(&Html::parse_document(
        r#"<input type="hidden" name="__VIEWSTATE" value="old" />"#,
    ));
    tokens.absorb(&Html::parse_document(
        r#"<input type="hidden" name="__VIEWSTATE" value="new" />"#,
    ));
    assert_eq!(tokens.view_state(), Some("new"));
}
