use indoc::indoc;
use pretty_assertions::assert_eq;

use cfn_risk_scanner::{scan_template, Category, Error, Rule, RuleSet};

fn all_rules() -> RuleSet {
    [
        Rule::new(
            "IngressOpenToWorld",
            Category::NetworkIngress,
            r"^.*Ingress.*((0\.){3}0/0)",
            100,
            true,
        ),
        Rule::new(
            "SSHOpenToWorld",
            Category::NetworkIngress,
            r"^.*Ingress.*(([fF]rom[pP]ort.?.?.?22)|([tT]o[pP]ort.?.?.?22)).*((0\.){3}0/0)",
            100,
            true,
        ),
        Rule::new(
            "ForbiddenAMIs",
            Category::ComputeInstance,
            r"^.*ImageId.*?(ami-7a11e211)|(ami-08111162)|(ami-f6035893)",
            10,
            true,
        ),
    ]
    .into_iter()
    .collect::<Result<RuleSet, Error>>()
    .unwrap()
}

#[test]
fn scans_short_form_yaml_templates() {
    let template = indoc! {r#"
        AWSTemplateFormatVersion: "2010-09-09"
        Resources:
          SshIngress:
            Type: AWS::EC2::SecurityGroupIngress
            Properties:
              GroupId: !Ref WebSecurityGroup
              IpProtocol: tcp
              FromPort: 22
              ToPort: 22
              CidrIp: 0.0.0.0/0
          WebServer:
            Type: AWS::EC2::Instance
            Properties:
              ImageId: ami-7a11e211
              SubnetId: !GetAtt Network.PrivateSubnet
          WebSecurityGroup:
            Type: AWS::EC2::SecurityGroup
            Properties:
              GroupDescription: web
    "#};

    let result = scan_template(template, &all_rules()).unwrap();
    assert_eq!(result.risk_score, 210);
    assert_eq!(
        result.violated_rules,
        vec!["IngressOpenToWorld", "SSHOpenToWorld", "ForbiddenAMIs"]
    );
    assert_eq!(result.findings[2].resource, "WebServer");
}

#[test]
fn scans_json_templates() {
    let template = indoc! {r#"
        {
          "Resources": {
            "HttpsIngress": {
              "Type": "AWS::EC2::SecurityGroupIngress",
              "Properties": { "FromPort": 443, "ToPort": 443, "CidrIp": "10.0.0.0/16" }
            }
          }
        }
    "#};

    let result = scan_template(template, &all_rules()).unwrap();
    assert_eq!(result.risk_score, 0);
    assert!(result.violated_rules.is_empty());
}

#[test]
fn unreadable_templates_are_rejected() {
    let result = scan_template("Resources: [unterminated", &all_rules());
    assert!(matches!(result, Err(Error::MalformedTemplate(_))));
}
