//! End-to-end parsing of screenplay files
//!
//! Tokens, projects and JSON exports of the screenplays under `tests/data`,
//! plus the small scenarios every grammar change must keep working.

mod common;

use common::fixture;
use rstest::rstest;
use screenplay::screenplay::error::ParseError;
use screenplay::{
    Asset, MultipleCharactersSpeaking, ParserConfig, Project, ScreenplayParser, Sequence, Token,
    TokensRule,
};

fn parse_source(text: &str) -> ScreenplayParser {
    ScreenplayParser::from_source("script", text, ParserConfig::default()).unwrap()
}

fn courtroom_tokens() -> Vec<Token> {
    vec![
        Token::shot_instruction("FADE IN"),
        Token::scene_heading("EXT. CITY HALL", "EARLY MORNING"),
        Token::action(
            "Pigeons circle over an empty square. A tired CLERK unlocks the front door while a noisy CROWD gathers.",
        ),
        Token::scene_heading("INT. HEARING ROOM", "EARLY MORNING"),
        Token::character("CLERK"),
        Token::dialog("All rise for the honorable judge!"),
        Token::action(
            "The CROWD settles as the ACCUSED is led to a bench. A nervous LAWYER shuffles papers.",
        ),
        Token::character("LAWYER"),
        Token::dialog("We ask for a short recess."),
        Token::character("ACCUSED"),
        Token::parenthetical("furious"),
        Token::dialog("I did not come here to wait!"),
        Token::action("The lawyer winces."),
        Token::scene_heading("INT. HOLDING CELL", "NOON"),
        Token::action("The ACCUSED paces."),
        Token::character("ACCUSED"),
        Token::parenthetical("under his breath"),
        Token::dialog("Nobody listens."),
        Token::character("GUARD"),
        Token::parenthetical("bored"),
        Token::dialog("Visitor for you."),
        Token::action("A stranger, THE BROKER, steps inside."),
        Token::character("THE BROKER"),
        Token::dialog("You fired your lawyer?"),
        Token::character("ACCUSED"),
        Token::dialog("He was slow."),
        Token::scene_heading("EXT. HARBOR", "NIGHT"),
        Token::action("THE BROKER throws a briefcase into the water."),
    ]
}

#[test]
fn test_courtroom_raw_tokens_keep_paragraphs_apart() {
    let parser = ScreenplayParser::new(fixture("courtroom.txt"), ParserConfig::default()).unwrap();
    let raw = parser.tokenize().unwrap();
    assert_eq!(raw.len(), courtroom_tokens().len() + 2);
    assert_eq!(raw[2], Token::action("Pigeons circle over an empty square."));
    assert_eq!(
        raw[3],
        Token::action("A tired CLERK unlocks the front door while a noisy CROWD gathers.")
    );
}

#[test]
fn test_courtroom_tokens() {
    let parser = ScreenplayParser::new(fixture("courtroom.txt"), ParserConfig::default()).unwrap();
    assert_eq!(parser.name(), "courtroom");
    assert_eq!(parser.tokens().unwrap(), courtroom_tokens());
}

#[test]
fn test_blank_lines_inside_dialogs() {
    let relaxed = ParserConfig {
        rules: TokensRule::BlankLineNotDelimiter,
        ..ParserConfig::default()
    };
    let parser = ScreenplayParser::new(fixture("courtroom_blank_lines.txt"), relaxed).unwrap();
    assert_eq!(parser.tokens().unwrap(), courtroom_tokens());

    // The default rules end the dialog at the first blank line.
    let strict =
        ScreenplayParser::new(fixture("courtroom_blank_lines.txt"), ParserConfig::default())
            .unwrap();
    let tokens = strict.tokens().unwrap();
    assert_eq!(tokens[4], Token::shot_instruction("CLERK"));
    assert!(matches!(
        &tokens[5],
        Token::Action { content } if content.starts_with("All rise for the honorable judge!")
    ));
}

#[test]
fn test_courtroom_project() {
    let parser = ScreenplayParser::new(fixture("courtroom.txt"), ParserConfig::default()).unwrap();

    let clerk = Asset::character("CLERK");
    let accused = Asset::character("ACCUSED");
    let lawyer = Asset::character("LAWYER");
    let guard = Asset::character("GUARD");
    let broker = Asset::character("THE BROKER");
    let crowd = Asset::undefined("CROWD");

    let mut expected = Project::new("courtroom");
    expected.add_sequence(Sequence::new("0010").with_assets([clerk.clone(), crowd.clone()]));
    expected.add_sequence(Sequence::new("0020").with_assets([
        clerk.clone(),
        crowd.clone(),
        accused.clone(),
        lawyer.clone(),
    ]));
    expected.add_sequence(Sequence::new("0030").with_assets([
        accused.clone(),
        guard.clone(),
        broker.clone(),
    ]));
    expected.add_sequence(Sequence::new("0040").with_assets([broker.clone()]));
    assert_eq!(parser.to_pmt_project(true).unwrap(), expected);

    let mut expected = Project::new("courtroom");
    expected.add_sequence(Sequence::new("0010").with_assets([clerk.clone()]));
    expected.add_sequence(Sequence::new("0020").with_assets([clerk, accused.clone(), lawyer]));
    expected.add_sequence(Sequence::new("0030").with_assets([accused, guard, broker.clone()]));
    expected.add_sequence(Sequence::new("0040").with_assets([broker]));
    assert_eq!(parser.to_pmt_project(false).unwrap(), expected);
}

#[test]
fn test_only_characters_with_a_cue_are_confirmed() {
    let parser = ScreenplayParser::new(fixture("beach.txt"), ParserConfig::default()).unwrap();

    let thomas = Asset::character("THOMAS");
    let ray = Asset::character("RAY");
    let children = Asset::undefined("CHILDREN");

    let mut expected = Project::new("beach");
    expected.add_sequence(Sequence::new("0010").with_assets([
        thomas.clone(),
        children.clone(),
        Asset::undefined("BALL"),
        Asset::undefined("SAND CASTLE"),
    ]));
    expected.add_sequence(Sequence::new("0020").with_assets([ray.clone(), children]));
    expected.add_sequence(Sequence::new("0030").with_assets([thomas, ray]));
    assert_eq!(parser.to_pmt_project(true).unwrap(), expected);
}

#[test]
fn test_uppercase_dialog_and_indentation() {
    let parser = ScreenplayParser::new(fixture("shouting.txt"), ParserConfig::default()).unwrap();
    assert_eq!(
        parser.tokens().unwrap(),
        vec![
            Token::scene_heading("INT. DINER", "MORNING"),
            Token::character("MARK"),
            Token::dialog(
                "IF YOU'RE TIRED OF BREAKFAST BUT NOT HUNGRY FOR LUNCH, MICROWAVE YOURSELF A HEALTHY BOWL OF BRUNCH!"
            ),
        ]
    );
}

#[test]
fn test_courtroom_json() {
    let parser = ScreenplayParser::new(fixture("courtroom.txt"), ParserConfig::default()).unwrap();
    let json = parser.to_json(true).unwrap();
    insta::assert_snapshot!(json, @r#"
    {
      "type": "Project",
      "name": "courtroom",
      "children": [
        {
          "type": "Sequence",
          "name": "0010",
          "assets": [
            "CLERK",
            "CROWD"
          ],
          "children": []
        },
        {
          "type": "Asset",
          "name": "CLERK",
          "asset_type": "character",
          "children": []
        },
        {
          "type": "Sequence",
          "name": "0020",
          "assets": [
            "ACCUSED",
            "CLERK",
            "CROWD",
            "LAWYER"
          ],
          "children": []
        },
        {
          "type": "Asset",
          "name": "ACCUSED",
          "asset_type": "character",
          "children": []
        },
        {
          "type": "Asset",
          "name": "LAWYER",
          "asset_type": "character",
          "children": []
        },
        {
          "type": "Sequence",
          "name": "0030",
          "assets": [
            "ACCUSED",
            "GUARD",
            "THE BROKER"
          ],
          "children": []
        },
        {
          "type": "Asset",
          "name": "GUARD",
          "asset_type": "character",
          "children": []
        },
        {
          "type": "Asset",
          "name": "THE BROKER",
          "asset_type": "character",
          "children": []
        },
        {
          "type": "Sequence",
          "name": "0040",
          "assets": [
            "THE BROKER"
          ],
          "children": []
        },
        {
          "type": "Asset",
          "name": "CROWD",
          "asset_type": "undefined",
          "children": []
        }
      ]
    }
    "#);
}

#[test]
fn test_missing_file() {
    let result = ScreenplayParser::new(fixture("no_such_script.txt"), ParserConfig::default());
    assert!(matches!(result, Err(ParseError::Io { .. })));
}

#[rstest]
#[case::keep_first(MultipleCharactersSpeaking::KeepFirstCharacter, "BOB")]
#[case::keep_all(MultipleCharactersSpeaking::KeepAll, "BOB & ALICE")]
fn test_multiple_characters_policy(
    #[case] multiple_characters: MultipleCharactersSpeaking,
    #[case] name: &str,
) {
    let config = ParserConfig {
        multiple_characters,
        ..ParserConfig::default()
    };
    let parser =
        ScreenplayParser::from_source("duet", "INT. STAGE - NIGHT\nBOB & ALICE\nLa la la.", config)
            .unwrap();
    let project = parser.to_pmt_project(false).unwrap();
    assert_eq!(project.assets().collect::<Vec<_>>(), vec![&Asset::character(name)]);
}

mod scenarios {
    use super::*;

    #[test]
    fn scene_heading_line() {
        assert_eq!(
            parse_source("INT. KITCHEN - DAY").tokens().unwrap(),
            vec![Token::SceneHeading {
                location: "INT. KITCHEN".to_string(),
                lighting_scenario: "DAY".to_string(),
            }]
        );
    }

    #[test]
    fn cue_followed_by_dialog() {
        let parser = parse_source("INT. KITCHEN - DAY\nJOHN\nHello there.");
        let expected = vec![
            Token::scene_heading("INT. KITCHEN", "DAY"),
            Token::character("JOHN"),
            Token::dialog("Hello there."),
        ];
        assert_eq!(parser.tokenize().unwrap(), expected);
        assert_eq!(parser.tokens().unwrap(), expected);
    }

    #[test]
    fn cue_at_end_of_file() {
        let parser = parse_source("INT. GATE - NIGHT\n\nGUARD A");
        assert_eq!(
            parser.tokenize().unwrap(),
            vec![
                Token::scene_heading("INT. GATE", "NIGHT"),
                Token::character("GUARD A"),
            ]
        );
        assert_eq!(
            parser.tokens().unwrap(),
            vec![
                Token::scene_heading("INT. GATE", "NIGHT"),
                Token::shot_instruction("GUARD A"),
            ]
        );
    }

    #[test]
    fn consecutive_action_lines() {
        let parser = parse_source("INT. ROOM - DAY\nHe walks in.\nHe sits down.");
        assert_eq!(
            parser.tokens().unwrap(),
            vec![
                Token::scene_heading("INT. ROOM", "DAY"),
                Token::action("He walks in. He sits down."),
            ]
        );
    }

    #[test]
    fn same_character_in_two_scenes() {
        let parser = parse_source(
            "INT. HOUSE - DAY\n\nBOB\nMorning.\n\nEXT. GARDEN - DAY\n\nBOB\nStill morning.\n",
        );
        let project = parser.to_pmt_project(true).unwrap();

        let bob = Asset::character("BOB");
        let mut expected = Project::new("script");
        expected.add_sequence(Sequence::new("0010").with_assets([bob.clone()]));
        expected.add_sequence(Sequence::new("0020").with_assets([bob.clone()]));
        assert_eq!(project, expected);
        assert_eq!(project.children().len(), 3);
        assert_eq!(project.assets().collect::<Vec<_>>(), vec![&bob]);
    }

    #[test]
    fn title_page_is_dropped() {
        let title_page = "THE HEIST\n\nby SOMEONE FAMOUS\n\nMARTIN\nNot a line of dialog.\n\n";
        let body = "INT. BANK - NIGHT\n\nVAULT GUARD\nHalt!\n";
        let parser = parse_source(&format!("{}{}", title_page, body));

        let tokens = parser.tokens().unwrap();
        assert_eq!(tokens[0], Token::scene_heading("INT. BANK", "NIGHT"));

        let json = parser.to_json(true).unwrap();
        for word in ["HEIST", "FAMOUS", "MARTIN", "dialog"] {
            assert!(!json.contains(word), "{} leaked into {}", word, json);
        }
        assert!(json.contains("VAULT GUARD"));
    }

    #[test]
    fn no_scene_heading() {
        let project = parse_source("Just some notes.\n\nNOTHING ELSE\n")
            .to_pmt_project(true)
            .unwrap();
        assert_eq!(project, Project::new("script"));
    }
}
