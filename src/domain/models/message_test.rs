use super::Message;
use super::MessageType;
use crate::domain::models::Role;

#[test]
fn it_executes_new() {
    let msg = Message::new(Role::Assistant, "Hi there!");
    assert_eq!(msg.role, Role::Assistant);
    assert_eq!(msg.role.to_string(), "Chef");
    assert_eq!(msg.text, "Hi there!".to_string());
    assert_eq!(msg.mtype, MessageType::Normal);
    assert!(msg.is_complete());
}

#[test]
fn it_executes_new_replacing_tabs() {
    let msg = Message::new(Role::User, "\t\tHow long?");
    assert_eq!(msg.role.to_string(), "You");
    assert_eq!(msg.text, "    How long?".to_string());
}

#[test]
fn it_executes_new_with_type() {
    let msg = Message::new_with_type(Role::Assistant, MessageType::Error, "It broke!");
    assert_eq!(msg.message_type(), MessageType::Error);
    assert!(msg.is_error());
    assert!(msg.is_complete());
}

#[test]
fn it_appends_to_placeholder() {
    let mut msg = Message::placeholder();
    assert!(msg.is_open());
    assert!(msg.append("Boil "));
    assert!(msg.append("\twater"));
    assert_eq!(msg.text, "Boil   water");
    assert!(!msg.is_complete());
}

#[test]
fn it_refuses_appends_once_finished() {
    let mut msg = Message::placeholder();
    msg.append("Done");
    msg.finish();

    assert!(!msg.append(" again"));
    assert_eq!(msg.text, "Done");
    assert!(msg.is_complete());
    assert!(!msg.is_error());
}

#[test]
fn it_refuses_appends_to_user_messages() {
    let mut msg = Message::new(Role::User, "time?");
    assert!(!msg.is_open());
    assert!(!msg.append("!"));
    assert_eq!(msg.text, "time?");
}

#[test]
fn it_fails_keeping_partial_text() {
    let mut msg = Message::placeholder();
    msg.append("Start by");
    msg.fail("model crashed");

    assert_eq!(msg.text, "Start by");
    assert!(msg.is_complete());
    assert!(msg.is_error());
    assert_eq!(msg.failure_reason(), Some("model crashed"));
}
