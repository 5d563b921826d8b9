//! GraphQL SDL rendering of a built schema

use super::{Cardinality, FieldDescriptor, JoinType, Schema};
use crate::core::adapter::JoinAdapter;

impl<A: JoinAdapter> Schema<A> {
    /// Render the schema as GraphQL SDL
    ///
    /// Single relationships are nullable, many relationships are `[T!]!`.
    /// Extract fields take the type of the field they read.
    pub fn to_sdl(&self) -> String {
        let mut sdl = String::from("schema {\n");
        sdl.push_str(&format!("  query: {}\n", self.query_root().name()));
        if let Some(mutation) = self.mutation_root() {
            sdl.push_str(&format!("  mutation: {}\n", mutation.name()));
        }
        sdl.push_str("}\n");

        for join_type in self.types() {
            sdl.push_str(&format!("\ntype {} {{\n", join_type.name()));
            for field in join_type.fields().values() {
                sdl.push_str(&format!(
                    "  {}{}: {}\n",
                    field.name(),
                    arguments_sdl(field.descriptor()),
                    self.type_sdl(join_type, field.descriptor())
                ));
            }
            sdl.push_str("}\n");
        }

        sdl
    }

    fn type_sdl(&self, owner: &JoinType<A>, descriptor: &FieldDescriptor<A>) -> String {
        match descriptor {
            FieldDescriptor::Immediate(immediate) => immediate.scalar.to_string(),
            FieldDescriptor::Relationship(relationship) => {
                let target = self.join_type(relationship.target()).name();
                match relationship.cardinality() {
                    Cardinality::Single => target.to_string(),
                    Cardinality::Many => format!("[{}!]!", target),
                }
            }
            FieldDescriptor::Extract(extract) => owner
                .field(&extract.relationship)
                .and_then(|field| field.as_relationship())
                .map(|relationship| self.join_type(relationship.target()))
                .and_then(|target| {
                    target
                        .field(&extract.field)
                        .map(|field| self.type_sdl(target, field.descriptor()))
                })
                .unwrap_or_else(|| "String".to_string()),
        }
    }
}

fn arguments_sdl<A: JoinAdapter>(descriptor: &FieldDescriptor<A>) -> String {
    let FieldDescriptor::Relationship(relationship) = descriptor else {
        return String::new();
    };
    if relationship.arguments().is_empty() {
        return String::new();
    }

    let args: Vec<String> = relationship
        .arguments()
        .iter()
        .map(|arg| format!("{}: {}", arg.name, arg.arg_type))
        .collect();
    format!("({})", args.join(", "))
}
