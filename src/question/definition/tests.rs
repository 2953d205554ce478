use super::*;

const QUESTIONS_CSV: &'static str = "\
title,channel,slug,body,choice_a,choice_b,choice_c,choice_d,choice_e,correct_answer,published
Gold,quizzes/science,,<p>Symbol for gold?</p>,Au,Ag,Gd,Go,Ge,a,
Silver,quizzes/science,silver-symbol,Symbol for silver?,Au,Ag,Gd,Go,Ge,B,true
Waterloo,Quizzes/History,,Year of Waterloo?,1805,1815,1825,1835,1845,b,false
";

#[test]
fn reads_rows() {
    let definition = QuizDefinition::from_reader(QUESTIONS_CSV.as_bytes()).unwrap();
    let questions = definition.get_questions();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0].correct_answer, Choice::A);
    assert_eq!(questions[0].slug, None);
    assert!(questions[0].published);
    assert_eq!(questions[1].slug, Some("silver-symbol".to_owned()));
    assert!(!questions[2].published);
}

#[test]
fn rejects_unknown_answer() {
    let csv = "\
title,channel,slug,body,choice_a,choice_b,choice_c,choice_d,choice_e,correct_answer,published
Gold,quizzes,,Symbol?,Au,Ag,Gd,Go,Ge,F,
";
    assert!(QuizDefinition::from_reader(csv.as_bytes()).is_err());
}

#[test]
fn rejects_bad_boolean() {
    let csv = "\
title,channel,slug,body,choice_a,choice_b,choice_c,choice_d,choice_e,correct_answer,published
Gold,quizzes,,Symbol?,Au,Ag,Gd,Go,Ge,A,maybe
";
    assert!(QuizDefinition::from_reader(csv.as_bytes()).is_err());
}

#[test]
fn import_creates_channels() {
    let store = Store::new(false);
    let now = Utc::now();
    let definition = QuizDefinition::from_reader(QUESTIONS_CSV.as_bytes()).unwrap();
    let ids = definition.import(&store, None, now).unwrap();
    assert_eq!(ids.len(), 3);

    let long_slugs: Vec<String> = store.channels().into_iter().map(|c| c.long_slug).collect();
    assert_eq!(
        long_slugs,
        vec![
            "quizzes".to_owned(),
            "quizzes/history".to_owned(),
            "quizzes/science".to_owned(),
        ]
    );

    let gold = store.get_question(ids[0]).unwrap();
    assert_eq!(gold.body, "Symbol for gold?");
    assert_eq!(gold.content.long_slug, "quizzes/science/gold");
    let silver = store.get_question(ids[1]).unwrap();
    assert_eq!(silver.content.long_slug, "quizzes/science/silver-symbol");
    let waterloo = store.get_question(ids[2]).unwrap();
    assert!(!waterloo.content.publication.published);
}

#[test]
fn import_reports_duplicates() {
    let store = Store::new(false);
    let now = Utc::now();
    QuizDefinition::from_reader(QUESTIONS_CSV.as_bytes())
        .unwrap()
        .import(&store, None, now)
        .unwrap();
    let again = QuizDefinition::from_reader(QUESTIONS_CSV.as_bytes())
        .unwrap()
        .import(&store, None, now);
    assert!(again.is_err());
}
