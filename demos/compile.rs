use pathrules::{CompileError, Compiler, Directives, RuleCategory};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut compiler = Compiler::new();
    let compilation = compiler.compile(|root| {
        root.at("users/$uid", |user| {
            user.add(RuleCategory::Read, "auth.uid == $uid");
            user.authorize(
                Directives::new()
                    .rule(RuleCategory::Write, "auth.uid == $uid")
                    .child(
                        "email",
                        Directives::new().rule(RuleCategory::Validate, "newData.isString()"),
                    ),
            )
        });

        root.at("rooms/$room", |room| {
            room.add(RuleCategory::Read, "auth != null");
            room.at("messages/$msg", |msg| {
                msg.add(RuleCategory::Create, "auth != null")
                    .validate("newData.hasChildren(['text', 'author'])");
                Ok(())
            });
            Ok(())
        });

        // Dropped with a warning; the rest of the tree is unaffected.
        root.at("audit", |audit| {
            audit.add(RuleCategory::Read, "root.child('admins').hasChild(auth.uid)");
            Err(CompileError::predicate("unknown function 'isAdmin'"))
        });

        Ok(())
    });

    println!("{}", compilation.tree());
    println!("{compilation}");
    for diagnostic in compilation.diagnostics() {
        println!("dropped: {diagnostic}");
    }
}
